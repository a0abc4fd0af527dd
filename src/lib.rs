//! Heuristic extraction of filenames and part numbering from Usenet post
//! subjects, and the NZB index documents that carry them.

pub mod model;
pub mod nzb;
pub mod subject;
pub mod util;
