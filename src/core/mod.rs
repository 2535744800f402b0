pub mod intermediate_representation;
pub mod job;
pub mod parser;
