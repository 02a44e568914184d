// @Req(CART-1, rev=v2)
#[test]
fn adds_items() {}

// @Req(CHECKOUT-2)
#[test]
fn pays_by_invoice() {}
