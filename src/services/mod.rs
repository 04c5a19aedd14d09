pub mod events;
pub mod guests;
pub mod likes;
pub mod media;
pub mod s3;
pub mod uploader;
