//! 数据模型模块
//! 资产、参照目录、变更历史、导入、报表与工单模型

pub mod asset;
pub mod catalog;
pub mod history;
pub mod import;
pub mod report;
pub mod ticket;
