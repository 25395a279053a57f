pub mod fake;
pub mod openai;
