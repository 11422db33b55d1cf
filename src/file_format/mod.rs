pub mod config;
pub mod graph_extra;
pub mod sym_info;
