use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub aws_region: String,
    // Set for S3-compatible providers (MinIO, Supabase Storage); unset for AWS.
    pub s3_endpoint: Option<String>,
    pub s3_bucket_name: String,
}

impl Config {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let aws_access_key_id =
            env::var("AWS_ACCESS_KEY_ID").expect("AWS_ACCESS_KEY_ID must be set");
        let aws_secret_access_key =
            env::var("AWS_SECRET_ACCESS_KEY").expect("AWS_SECRET_ACCESS_KEY must be set");
        let aws_region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let s3_endpoint = env::var("S3_ENDPOINT").ok();
        let s3_bucket_name =
            env::var("S3_BUCKET_NAME").unwrap_or_else(|_| "event-media".to_string());

        Self {
            database_url,
            aws_access_key_id,
            aws_secret_access_key,
            aws_region,
            s3_endpoint,
            s3_bucket_name,
        }
    }
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}
