#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition(pub usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Navigate(pub &'static str);
