// Sales-export dashboard pipeline.
//
// Raw export rows flow one way: the loader maps contract columns into
// untyped cells, the normalizer coerces them into canonical transaction
// records, the aggregation engine computes the grouped/ranked/statistical
// views, and the report assembler packages views and KPIs for the renderer.
pub mod aggregate;
pub mod loader;
pub mod normalizer;
pub mod output;
pub mod parsers;
pub mod report;
pub mod types;
pub mod util;
