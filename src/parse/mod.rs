mod grammar;
mod scanner;

pub(crate) use scanner::scan;
