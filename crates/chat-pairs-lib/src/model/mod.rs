pub mod conversation;
pub mod message;
pub mod qa_pair;
