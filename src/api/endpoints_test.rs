use super::*;

#[test]
fn detail_paths() {
    assert_eq!(product_detail("64f0a1"), "/products/64f0a1");
    assert_eq!(order_detail("o-1"), "/orders/o-1");
    assert_eq!(admin_product("p1"), "/admin/products/p1");
    assert_eq!(admin_order_status("o1"), "/admin/orders/o1/status");
    assert_eq!(admin_user("u1"), "/admin/users/u1");
    assert_eq!(admin_user_admin_status("u1"), "/admin/users/u1/admin-status");
}

#[test]
fn ids_cannot_escape_their_segment() {
    assert_eq!(product_detail("../admin/users"), "/products/..%2Fadmin%2Fusers");
    assert_eq!(order_detail("o1?x=1"), "/orders/o1%3Fx%3D1");
    assert_eq!(admin_user("a b"), "/admin/users/a%20b");
}
