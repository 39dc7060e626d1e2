mod output_tests;
mod utils;
