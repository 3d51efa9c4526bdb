mod runtime;
mod support;

mod test_common_validation;
