#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;

impl Default for Page {
    fn default() -> Self {
        Self {
            number: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Page {
    pub fn new(number: u32, size: u32) -> Self {
        Self { number, size }
    }

    pub fn query_params(&self) -> [(String, String); 2] {
        [
            ("page".to_string(), self.number.to_string()),
            ("page_size".to_string(), self.size.to_string()),
        ]
    }
}
