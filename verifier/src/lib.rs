//! Retriever and node side of the datalayr pipeline: low-degree and
//! multireveal proof checks ([verify]) and the validation a storage node runs
//! on the frames it receives ([validate]).

pub mod validate;
pub mod verify;
