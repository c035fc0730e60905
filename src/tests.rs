pub mod test_utils;

pub mod ast_tree;
pub mod expression_tree;
pub mod parser_c;
pub mod parser_cpp;
pub mod selector;

pub mod include_guards;
pub mod includes;
pub mod macro_locations;

pub mod implicit_names;
pub mod kr_functions;
pub mod resolver_c;
pub mod resolver_cpp;

pub mod translation_unit;
