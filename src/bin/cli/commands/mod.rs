pub mod card;
pub mod deck;
pub mod due;
pub mod review;
pub mod stats;
