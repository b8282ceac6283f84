pub mod algorithm;
pub mod scene_settings;
