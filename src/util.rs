pub(crate) mod encoding;
pub mod fcm;
pub mod pca;
pub mod text;
