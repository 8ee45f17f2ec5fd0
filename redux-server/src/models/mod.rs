pub mod cms;
pub mod contact;
pub mod health;
pub mod media;
pub mod record;
