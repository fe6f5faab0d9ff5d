

#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    UInt(u32),
    String(String),
    None,
    // .. tbd
}
