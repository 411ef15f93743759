pub mod chat_api;
pub mod coach_prompt;
pub mod config;
pub mod knowledge_base;
pub mod quiz_catalog;
pub mod quiz_engine;
pub mod rate_limiter;
pub mod scoring;
pub mod submission;
