//! The hiring questionnaire bot: linear form flow, admin commands,
//! submission fan-out.

pub mod flow;
pub mod handlers;
pub mod keyboards;
pub mod submit;
pub mod validators;

#[cfg(test)]
mod tests;
