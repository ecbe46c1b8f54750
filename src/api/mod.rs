pub mod feishu;
pub mod transport;
