//! Aggregation of classified variants into summary tables.

pub mod chrom;
pub mod cli;
pub mod compare;
pub mod output;
pub mod summary;
pub mod table;
