/*!
This crate contains small utilities shared by the other crates in the workspace.
*/

pub mod error;
pub mod progress_counter;
