use std::rc::Rc;

use dui_core::widgets::modal_family::ModalFamily;
use dui_core::{Dom, EventKind, Family, ListenTarget, Markup, Visibility};
use dui_test_support::{FakeDom, FakeNode, init_test_logging};

struct Page {
    trigger: FakeNode,
    root: FakeNode,
    content: FakeNode,
    dismiss: FakeNode,
}

fn page(dom: &FakeDom, root_attrs: &[(&str, &str)]) -> Page {
    let trigger = dom.add(
        dom.root(),
        "button",
        &[("data-dui-toggle", "modal"), ("data-dui-target", "#m1")],
    );
    let mut attrs = vec![
        ("id", "m1"),
        ("aria-hidden", "true"),
        ("class", "fixed opacity-0 pointer-events-none"),
    ];
    attrs.extend_from_slice(root_attrs);
    let root = dom.add(dom.root(), "div", &attrs);
    let content = dom.add(root, "div", &[("class", "scale-95")]);
    let dismiss = dom.add(content, "button", &[("data-dui-dismiss", "modal")]);
    Page {
        trigger,
        root,
        content,
        dismiss,
    }
}

fn family(dom: &Rc<FakeDom>) -> Rc<ModalFamily<FakeDom>> {
    let family = ModalFamily::new(Rc::clone(dom), Markup::default());
    family.scan();
    family
}

fn state(family: &ModalFamily<FakeDom>, root: FakeNode) -> Option<Visibility> {
    family.instance(&root).map(|modal| modal.state())
}

fn backdrops(dom: &FakeDom) -> anyhow::Result<usize> {
    Ok(dom.query_all(&Markup::default().backdrop_selector())?.len())
}

#[test]
fn trigger_opens_and_dismiss_closes_with_delayed_pointer_block() -> anyhow::Result<()> {
    init_test_logging();
    let dom = FakeDom::shared();
    let page = page(&dom, &[]);
    let family = family(&dom);
    assert_eq!(family.bound_count(), 2);

    dom.click(page.trigger);
    assert_eq!(state(&family, page.root), Some(Visibility::Visible));
    assert!(dom.has_class(&page.root, "opacity-100"));
    assert!(!dom.has_class(&page.root, "opacity-0"));
    assert!(!dom.has_class(&page.root, "pointer-events-none"));
    assert_eq!(dom.attribute(&page.root, "aria-hidden").as_deref(), Some("false"));
    assert!(dom.has_class(&page.content, "scale-100"));
    assert!(!dom.has_class(&page.content, "scale-95"));
    assert_eq!(backdrops(&dom)?, 1);

    dom.click(page.dismiss);
    assert_eq!(state(&family, page.root), Some(Visibility::Closing));
    assert!(dom.has_class(&page.root, "opacity-0"));
    assert!(!dom.has_class(&page.root, "opacity-100"));
    assert!(!dom.has_class(&page.root, "pointer-events-none"));
    assert_eq!(dom.attribute(&page.root, "aria-hidden").as_deref(), Some("true"));
    assert!(dom.has_class(&page.content, "scale-95"));
    assert_eq!(backdrops(&dom)?, 0);
    assert_eq!(dom.parent(&page.root), Some(dom.root()));

    dom.advance(299);
    assert!(!dom.has_class(&page.root, "pointer-events-none"));
    dom.advance(1);
    assert_eq!(state(&family, page.root), Some(Visibility::Hidden));
    assert!(dom.has_class(&page.root, "pointer-events-none"));
    Ok(())
}

#[test]
fn reopening_before_the_delay_keeps_the_modal_interactive() {
    let dom = FakeDom::shared();
    let page = page(&dom, &[]);
    let family = family(&dom);

    dom.click(page.trigger);
    dom.click(page.dismiss);
    dom.advance(100);
    dom.click(page.trigger);
    dom.advance(1_000);

    assert_eq!(state(&family, page.root), Some(Visibility::Visible));
    assert!(!dom.has_class(&page.root, "pointer-events-none"));
}

#[test]
fn only_the_latest_close_blocks_pointer_events() {
    let dom = FakeDom::shared();
    let page = page(&dom, &[]);
    let family = family(&dom);

    dom.click(page.trigger);
    dom.click(page.dismiss);
    dom.advance(100);
    dom.click(page.trigger);
    dom.advance(100);
    dom.click(page.dismiss);

    // The first close step is stale once the second close is pending.
    dom.advance(100);
    assert_eq!(state(&family, page.root), Some(Visibility::Closing));
    assert!(!dom.has_class(&page.root, "pointer-events-none"));

    dom.advance(200);
    assert_eq!(state(&family, page.root), Some(Visibility::Hidden));
    assert!(dom.has_class(&page.root, "pointer-events-none"));
}

#[test]
fn trigger_toggles_an_open_modal_closed() {
    let dom = FakeDom::shared();
    let page = page(&dom, &[]);
    let family = family(&dom);

    dom.click(page.trigger);
    dom.click(page.trigger);
    assert_eq!(state(&family, page.root), Some(Visibility::Closing));
    assert_eq!(family.instance_count(), 1);
}

#[test]
fn escape_and_outside_clicks_close() {
    let dom = FakeDom::shared();
    let page = page(&dom, &[]);
    let family = family(&dom);

    dom.click(page.trigger);
    dom.click(page.content);
    assert_eq!(state(&family, page.root), Some(Visibility::Visible));
    dom.click(page.root);
    assert_eq!(state(&family, page.root), Some(Visibility::Closing));

    dom.click(page.trigger);
    dom.key_down("Escape");
    assert_eq!(state(&family, page.root), Some(Visibility::Closing));
    assert_eq!(dom.listener_count(), 2);
}

#[test]
fn data_attributes_override_defaults() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let page = page(
        &dom,
        &[("data-dui-backdrop", "false"), ("data-dui-keyboard", "false")],
    );
    let family = family(&dom);

    dom.click(page.trigger);
    assert_eq!(backdrops(&dom)?, 0);
    dom.key_down("Escape");
    assert_eq!(state(&family, page.root), Some(Visibility::Visible));
    let modal = family
        .instance(&page.root)
        .ok_or_else(|| anyhow::anyhow!("instance should exist after a toggle"))?;
    modal.close()?;
    assert_eq!(modal.state(), Visibility::Closing);
    Ok(())
}

#[test]
fn unresolvable_targets_are_ignored() {
    let dom = FakeDom::shared();
    let missing = dom.add(
        dom.root(),
        "button",
        &[("data-dui-toggle", "modal"), ("data-dui-target", "#nope")],
    );
    let bare = dom.add(
        dom.root(),
        "button",
        &[("data-dui-toggle", "modal"), ("data-dui-target", "m1")],
    );
    let untargeted = dom.add(dom.root(), "button", &[("data-dui-toggle", "modal")]);
    dom.add(dom.root(), "div", &[("id", "m1"), ("class", "pointer-events-none")]);
    let family = family(&dom);

    dom.click(missing);
    dom.click(bare);
    dom.click(untargeted);
    assert_eq!(family.instance_count(), 0);
}

#[test]
fn dismiss_outside_any_modal_is_ignored() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let stray = dom.add(dom.root(), "button", &[("data-dui-dismiss", "modal")]);
    let family = family(&dom);
    family.dismiss_from(&stray)?;
    dom.click(stray);
    assert_eq!(family.instance_count(), 0);
    Ok(())
}

#[test]
fn cleanup_releases_bindings_and_open_modals() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let page = page(&dom, &[]);
    let family = family(&dom);

    dom.click(page.trigger);
    assert_eq!(backdrops(&dom)?, 1);
    family.cleanup();
    assert_eq!(dom.listener_count(), 0);
    assert_eq!(backdrops(&dom)?, 0);
    assert_eq!(family.bound_count(), 0);
    assert_eq!(family.instance_count(), 0);

    dom.click(page.trigger);
    assert_eq!(family.instance_count(), 0);
    Ok(())
}

#[test]
fn element_with_both_markers_is_bound_once_as_a_trigger() {
    let dom = FakeDom::shared();
    let root = dom.add(
        dom.root(),
        "div",
        &[("id", "m1"), ("class", "opacity-0 pointer-events-none")],
    );
    dom.add(root, "div", &[("class", "scale-95")]);
    let both = dom.add(
        dom.root(),
        "button",
        &[
            ("data-dui-toggle", "modal"),
            ("data-dui-target", "#m1"),
            ("data-dui-dismiss", "modal"),
        ],
    );
    let family = ModalFamily::new(Rc::clone(&dom), Markup::default());

    let report = family.scan();
    assert_eq!(report.bound, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(family.bound_count(), 1);
    assert_eq!(dom.listeners_on(&ListenTarget::Node(both), EventKind::Click), 1);
    assert_eq!(family.scan().bound, 0);

    dom.click(both);
    assert_eq!(state(&family, root), Some(Visibility::Visible));
}

#[test]
fn tracking_a_root_normalises_aria_hidden() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let hidden = dom.add(
        dom.root(),
        "div",
        &[("id", "m1"), ("class", "opacity-0 pointer-events-none")],
    );
    dom.add(hidden, "div", &[("class", "scale-95")]);
    let shown = dom.add(dom.root(), "div", &[("id", "m2"), ("class", "opacity-100")]);
    let family = ModalFamily::new(Rc::clone(&dom), Markup::default());

    let modal = family.instance_for(&hidden);
    assert_eq!(dom.attribute(&hidden, "aria-hidden").as_deref(), Some("true"));
    family.instance_for(&shown);
    assert_eq!(dom.attribute(&shown, "aria-hidden").as_deref(), Some("false"));

    let tracked = dom.snapshot(hidden);
    modal.open()?;
    modal.close()?;
    dom.advance(300);
    assert_eq!(modal.state(), Visibility::Hidden);
    assert_eq!(dom.snapshot(hidden), tracked);
    Ok(())
}
