pub mod bundle;
pub mod conflict;
pub mod entity;
pub mod error;
pub mod history;
pub mod mod_dto;
pub mod paths;
pub mod report;
