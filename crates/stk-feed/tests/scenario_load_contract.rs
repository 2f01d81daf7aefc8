use bigdecimal::{BigDecimal, Zero};
use stk_feed::*;

const FEED: &str = "\u{feff}<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<!-- magaza feed -->
<urunler>
  <urun><barkod>111</barkod><stok> 3 </stok></urun>
  <urun><barkod>222</barkod><stok/></urun>
  <urun><barkod>333</barkod><stok>1,75</stok></urun>
  <urun><stok>9</stok></urun>
</urunler>
";

#[test]
fn load_indexes_in_document_order() {
    let feed = load(FEED.as_bytes(), KeyField::Barcode).unwrap();
    assert_eq!(feed.products.keys().collect::<Vec<_>>(), ["111", "222", "333"]);
    assert_eq!(feed.stock_of("111"), Some(BigDecimal::from(3)));
    assert_eq!(feed.stock_of("222"), Some(BigDecimal::zero()));
    assert_eq!(feed.stock_of("333"), Some("1.75".parse::<BigDecimal>().unwrap()));
    assert!(feed.diagnostics.is_empty());
}

#[test]
fn keyless_product_remains_in_tree() {
    let feed = load(FEED.as_bytes(), KeyField::Barcode).unwrap();
    let doc = &feed.document;
    let all: Vec<_> = doc.child_elements(doc.root()).collect();
    assert_eq!(all.len(), 4);
    assert_eq!(doc.child_text(all[3], STOCK_TAG).as_deref(), Some("9"));
}

#[test]
fn load_then_render_is_stable() {
    let feed = load(FEED.as_bytes(), KeyField::Barcode).unwrap();
    let once = render_xml(&feed.document).unwrap();
    let twice = render_xml(&load(&once, KeyField::Barcode).unwrap().document).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn selector_validation_precedes_parsing() {
    assert_eq!(
        load_with_key(b"", "urunAdi").unwrap_err(),
        FeedError::InvalidArgument("urunAdi".to_string())
    );
    assert!(matches!(
        load_with_key(b"", "barkod").unwrap_err(),
        FeedError::InvalidFormat(_)
    ));
}

#[test]
fn only_direct_children_are_scanned() {
    let src = "<urunler><grup><urun><barkod>1</barkod></urun></grup></urunler>";
    let feed = load(src.as_bytes(), KeyField::Barcode).unwrap();
    assert!(feed.products.is_empty());
}
