// @Req(CHECKOUT-1)
pub fn pay_by_card(amount: u32) -> bool {
    amount > 0
}

// @Req(GIFT-9) gift cards were dropped from the backlog
pub fn redeem_gift_card(_code: &str) -> bool {
    false
}
