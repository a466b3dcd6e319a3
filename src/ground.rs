pub const VEL: i32 = 5;

/// Two copies of the ground tile scrolling side by side.
#[derive(Clone, Debug, PartialEq)]
pub struct Ground {
    pub y: i32,
    pub x1: i32,
    pub x2: i32,
    width: i32,
}

impl Ground {
    pub fn new(y: i32, width: i32) -> Self {
        Self { y, x1: 0, x2: width, width }
    }

    pub fn advance(&mut self) {
        self.x1 -= VEL;
        self.x2 -= VEL;
        if self.x1 + self.width < 0 {
            self.x1 = self.x2 + self.width;
        }
        if self.x2 + self.width < 0 {
            self.x2 = self.x1 + self.width;
        }
    }
}
