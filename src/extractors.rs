//! Content extraction from hovered and clicked elements
//!
//! Decides whether a node yields a value for the current field type:
//! - text: the node's own text nodes (one level deep), trimmed
//! - image: the source of an `<img>` element
//!
//! Every function here is a pure read of the page.

use ego_tree::NodeId;
use scraper::Node;

use crate::dom::Page;
use crate::types::{ExtractedValue, FieldType};

/// Extract the value `node` offers for `field_type`, if any
pub fn extract_content(page: &Page, node: NodeId, field_type: FieldType) -> Option<ExtractedValue> {
    let value = match field_type {
        FieldType::Text => extract_wrapped_text(page, node),
        FieldType::Image => extract_image_source(page, node),
        FieldType::Unknown => None,
    }?;

    Some(ExtractedValue {
        kind: field_type,
        value,
    })
}

/// Concatenate the direct child text nodes of `node`
///
/// Text inside nested elements belongs to those elements and is skipped.
/// Whitespace-only results are treated as no text at all.
pub fn extract_wrapped_text(page: &Page, node: NodeId) -> Option<String> {
    let element = page.node(node)?;
    if !element.value().is_element() {
        return None;
    }

    let combined: String = element
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => Some(&**text),
            _ => None,
        })
        .collect();

    let trimmed = combined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Source URL of an `<img>` element with a non-empty `src`
///
/// Relative sources are resolved against the page base URL when there is
/// one, matching what a browser reports for `img.src`. A whitespace-only
/// `src` resolves to the base itself; without a base it yields nothing.
pub fn extract_image_source(page: &Page, node: NodeId) -> Option<String> {
    if page.tag_name(node)? != "img" {
        return None;
    }

    let raw = page.attr(node, "src")?;
    if raw.is_empty() {
        return None;
    }

    let src = raw.trim();
    match page.base_url() {
        Some(base) => match base.join(src) {
            Ok(url) => Some(url.to_string()),
            Err(_) => (!src.is_empty()).then(|| src.to_string()),
        },
        None => (!src.is_empty()).then(|| src.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn first(page: &Page, selector: &str) -> NodeId {
        page.query_selector(selector).unwrap().unwrap()
    }

    #[test]
    fn test_direct_text_only() {
        let page = Page::parse("<html><body><div>  hello <span>world</span>  </div></body></html>");
        let div = first(&page, "div");

        let value = extract_content(&page, div, FieldType::Text).unwrap();
        assert_eq!(value.kind, FieldType::Text);
        assert_eq!(value.value, "hello");

        let span = first(&page, "span");
        assert_eq!(extract_wrapped_text(&page, span), Some("world".to_string()));
    }

    #[test]
    fn test_text_nodes_are_joined_in_order() {
        let page = Page::parse("<html><body><p>Price: <b>12</b> EUR</p></body></html>");
        let p = first(&page, "p");
        assert_eq!(extract_wrapped_text(&page, p), Some("Price:  EUR".to_string()));
    }

    #[test]
    fn test_whitespace_only_text_is_none() {
        let page = Page::parse("<html><body><div>   \n\t <em>x</em>  </div></body></html>");
        let div = first(&page, "div");
        assert_eq!(extract_content(&page, div, FieldType::Text), None);

        let page = Page::parse("<html><body><section></section></body></html>");
        let section = first(&page, "section");
        assert_eq!(extract_content(&page, section, FieldType::Text), None);
    }

    #[test]
    fn test_image_source() {
        let page = Page::parse(
            r#"<html><body>
                <img id="empty" src="">
                <img id="full" src="http://x/y.png">
                <img id="missing">
                <div id="div" src="http://x/z.png">not an image</div>
            </body></html>"#,
        );

        assert_eq!(extract_content(&page, first(&page, "#empty"), FieldType::Image), None);
        assert_eq!(
            extract_content(&page, first(&page, "#full"), FieldType::Image),
            Some(ExtractedValue {
                kind: FieldType::Image,
                value: "http://x/y.png".to_string(),
            })
        );
        assert_eq!(extract_content(&page, first(&page, "#missing"), FieldType::Image), None);
        assert_eq!(extract_content(&page, first(&page, "#div"), FieldType::Image), None);
    }

    #[test]
    fn test_relative_image_source_uses_base_url() {
        let page = Page::parse(r#"<html><body><img src="../img/a.png"></body></html>"#)
            .with_base_url(Url::parse("https://shop.example/products/item/").unwrap());
        let img = first(&page, "img");
        assert_eq!(
            extract_image_source(&page, img),
            Some("https://shop.example/products/img/a.png".to_string())
        );
    }

    #[test]
    fn test_whitespace_source_resolves_to_base() {
        let page = Page::parse(r#"<html><body><img src=" "><img src=" b.png "></body></html>"#);
        let images = page.query_selector_all("img").unwrap();
        assert_eq!(extract_image_source(&page, images[0]), None);
        assert_eq!(extract_image_source(&page, images[1]), Some("b.png".to_string()));

        let page = page.with_base_url(Url::parse("https://a.example/p/").unwrap());
        assert_eq!(
            extract_image_source(&page, images[0]),
            Some("https://a.example/p/".to_string())
        );
        assert_eq!(
            extract_image_source(&page, images[1]),
            Some("https://a.example/p/b.png".to_string())
        );
    }

    #[test]
    fn test_field_type_mismatch_and_unknown() {
        let page = Page::parse(r#"<html><body><p>Caption</p><img src="a.png"></body></html>"#);
        let p = first(&page, "p");
        let img = first(&page, "img");

        assert_eq!(extract_content(&page, p, FieldType::Image), None);
        assert_eq!(extract_content(&page, img, FieldType::Text), None);
        assert_eq!(extract_content(&page, p, FieldType::Unknown), None);
        assert_eq!(extract_content(&page, img, FieldType::Unknown), None);
    }

    #[test]
    fn test_non_element_nodes() {
        let page = Page::parse("<html><body><p>Caption</p></body></html>");
        let p = first(&page, "p");
        let text_node = page.children(p)[0];
        assert_eq!(extract_content(&page, text_node, FieldType::Text), None);
        assert_eq!(extract_content(&page, text_node, FieldType::Image), None);
    }
}
