pub mod multipart;
pub mod storage;
pub mod upload_service;
