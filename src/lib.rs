//! Alt text generator: uploaded images are labeled by Amazon Rekognition and
//! the labels are turned into a one-sentence caption by a chat-completions
//! model.

pub mod caption;
pub mod config;
pub mod credential;
pub mod error;
pub mod labels;
pub mod openai;
pub mod pipeline;
pub mod rekognition;
pub mod server;
pub mod telemetry;
pub mod upload;
