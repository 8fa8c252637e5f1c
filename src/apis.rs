pub mod bedrock;
pub mod line;
pub mod s3;
