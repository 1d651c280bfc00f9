use std::rc::Rc;

use dui_core::{Dom, DuiError, EventKind, ListenTarget, Markup, Modal, ModalConfig};
use dui_test_support::{FakeDom, FakeNode, init_test_logging};

struct Page {
    wrapper: FakeNode,
    modal: FakeNode,
    panel: FakeNode,
    inside: FakeNode,
    sibling: FakeNode,
    outside: FakeNode,
}

fn page(dom: &FakeDom) -> Page {
    let wrapper = dom.add(dom.root(), "main", &[]);
    let modal = dom.add(wrapper, "div", &[("id", "m1"), ("class", "hidden")]);
    let panel = dom.add(modal, "div", &[("class", "panel")]);
    let inside = dom.add(panel, "button", &[]);
    let sibling = dom.add(wrapper, "p", &[]);
    let outside = dom.add(dom.root(), "footer", &[]);
    Page {
        wrapper,
        modal,
        panel,
        inside,
        sibling,
        outside,
    }
}

fn backdrops(dom: &FakeDom) -> anyhow::Result<usize> {
    Ok(dom.query_all(&Markup::default().backdrop_selector())?.len())
}

#[test]
fn show_then_hide_restores_the_element() -> anyhow::Result<()> {
    init_test_logging();
    let dom = FakeDom::shared();
    let page = page(&dom);
    let modal = Modal::from_selector(Rc::clone(&dom), "#m1", ModalConfig::default())?;
    assert!(!modal.is_visible());
    let before = dom.snapshot(page.modal);

    modal.show()?;
    assert!(modal.is_visible());
    assert!(dom.has_class(&page.modal, "opacity-100"));
    assert!(dom.has_class(&page.modal, "block"));
    assert!(!dom.has_class(&page.modal, "hidden"));
    assert_eq!(dom.attribute(&page.modal, "aria-hidden").as_deref(), Some("false"));
    assert_eq!(backdrops(&dom)?, 1);
    let layer = dom.parent(&page.modal);
    assert_ne!(layer, Some(page.wrapper));
    assert!(layer.is_some_and(|layer| dom.has_class(&layer, "bg-opacity-50")));

    modal.hide()?;
    assert!(!modal.is_visible());
    assert_eq!(dom.snapshot(page.modal), before);
    assert_eq!(dom.children(page.wrapper), vec![page.modal, page.sibling]);
    assert_eq!(backdrops(&dom)?, 0);
    assert_eq!(dom.listener_count(), 0);
    Ok(())
}

#[test]
fn repeated_show_and_hide_are_no_ops() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let page = page(&dom);
    let modal = Modal::new(Rc::clone(&dom), page.modal, ModalConfig::default())?;

    modal.show()?;
    modal.show()?;
    assert_eq!(backdrops(&dom)?, 1);
    assert_eq!(dom.listener_count(), 2);

    modal.hide()?;
    modal.hide()?;
    assert_eq!(backdrops(&dom)?, 0);
    assert_eq!(dom.listener_count(), 0);

    modal.toggle()?;
    assert!(modal.is_visible());
    modal.toggle()?;
    assert!(!modal.is_visible());
    Ok(())
}

#[test]
fn escape_closes_and_other_keys_do_not() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let page = page(&dom);
    let modal = Modal::new(Rc::clone(&dom), page.modal, ModalConfig::default())?;
    modal.show()?;

    dom.key_down("Enter");
    assert!(modal.is_visible());
    dom.key_down("Escape");
    assert!(!modal.is_visible());
    assert_eq!(backdrops(&dom)?, 0);
    Ok(())
}

#[test]
fn clicks_outside_the_panel_close() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let page = page(&dom);
    let modal = Modal::new(Rc::clone(&dom), page.modal, ModalConfig::default())?;

    modal.show()?;
    dom.click(page.inside);
    dom.click(page.panel);
    assert!(modal.is_visible());

    let layer = dom
        .parent(&page.modal)
        .ok_or_else(|| anyhow::anyhow!("modal should sit inside its backdrop"))?;
    dom.click(layer);
    assert!(!modal.is_visible());

    modal.show()?;
    dom.click(page.outside);
    assert!(!modal.is_visible());
    Ok(())
}

#[test]
fn disabled_dismissals_install_nothing() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let page = page(&dom);
    let config = ModalConfig {
        backdrop: false,
        keyboard: false,
        close_on_outside_click: false,
        ..ModalConfig::default()
    };
    let modal = Modal::new(Rc::clone(&dom), page.modal, config)?;

    modal.show()?;
    assert_eq!(dom.listener_count(), 0);
    assert_eq!(backdrops(&dom)?, 0);
    assert_eq!(dom.parent(&page.modal), Some(page.wrapper));

    dom.key_down("Escape");
    dom.click(page.outside);
    assert!(modal.is_visible());
    Ok(())
}

#[test]
fn keyboard_only_listens_for_keys() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let page = page(&dom);
    let config = ModalConfig::from_json(r#"{"closeOnOutsideClick": false}"#)?;
    let modal = Modal::new(Rc::clone(&dom), page.modal, config)?;
    modal.show()?;
    assert_eq!(dom.listeners_on(&ListenTarget::Document, EventKind::KeyDown), 1);
    assert_eq!(dom.listeners_on(&ListenTarget::Document, EventKind::Click), 0);
    Ok(())
}

#[test]
fn visible_markup_starts_visible() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let element = dom.add(dom.root(), "div", &[("aria-hidden", "false")]);
    let modal = Modal::new(Rc::clone(&dom), element, ModalConfig::default())?;
    assert!(modal.is_visible());
    assert!(dom.has_class(&element, "opacity-100"));

    let hidden = dom.add(dom.root(), "div", &[("aria-hidden", "true")]);
    let modal = Modal::new(Rc::clone(&dom), hidden, ModalConfig::default())?;
    assert!(!modal.is_visible());
    assert!(dom.has_class(&hidden, "hidden"));
    Ok(())
}

#[test]
fn destroy_is_repeatable() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let page = page(&dom);
    let modal = Modal::new(Rc::clone(&dom), page.modal, ModalConfig::default())?;
    modal.show()?;
    modal.destroy()?;
    modal.destroy()?;
    assert!(!modal.is_visible());
    assert_eq!(dom.listener_count(), 0);
    assert_eq!(backdrops(&dom)?, 0);
    Ok(())
}

#[test]
fn unknown_selector_is_a_resolution_error() {
    let dom = FakeDom::shared();
    let result = Modal::from_selector(Rc::clone(&dom), "#missing", ModalConfig::default());
    assert!(matches!(
        result,
        Err(DuiError::Resolution { ref selector }) if selector == "#missing"
    ));
}
