//! 传输能力模块：引擎只依赖 [`traits::transport::Transport`]，HTTP 实现可替换。

pub mod structs;
pub mod traits;
