//! Platform-specific extractors.

pub mod flickr;

pub use flickr::FlickrExtractor;
