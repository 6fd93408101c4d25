mod pipeline_tests;
mod support;
