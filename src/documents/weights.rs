/// Modulo-11 weights for CNPJ check digits: 2, 3, ..., 9, 2, 3, ...
///
/// Applied right-to-left, starting at the digit just before the check digit.
#[derive(Copy, Clone, Debug)]
pub struct Weights(u32);

impl Weights {
    pub fn new() -> Self {
        Weights(2)
    }
}

impl Iterator for Weights {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        let weight = self.0;
        self.0 = if weight == 9 { 2 } else { weight + 1 };
        Some(weight)
    }
}
