pub mod file_merge;
pub mod range_planner;
pub mod slice_files;
