pub mod execution_context;
