//! Voice character effects.

pub mod character;

pub use character::VoiceCharacter;
