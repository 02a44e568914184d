pub struct Cart {
    items: Vec<(String, u32)>,
}

impl Cart {
    // @Req(CART-1, rev=v2)
    pub fn add(&mut self, sku: &str, cents: u32) {
        self.items.push((sku.to_string(), cents));
    }

    // @Req(CART-2, rev=v0)
    pub fn total(&self) -> u32 {
        let net: u32 = self.items.iter().map(|(_, c)| c).sum();
        net + net / 5
    }
}
