use std::rc::Rc;

use dui_core::{Dom, FamilyKind, Toolkit, ToolkitConfig, Visibility};
use dui_test_support::{FakeDom, FakeLoader, FakeNode, fake_bridge, init_test_logging};

struct Page {
    modal_trigger: FakeNode,
    modal_root: FakeNode,
    dropdown_trigger: FakeNode,
    dropdown_menu: FakeNode,
    alert: FakeNode,
    alert_close: FakeNode,
}

fn page(dom: &FakeDom, prefix: &str) -> Page {
    let toggle = format!("data-{prefix}-toggle");
    let target = format!("data-{prefix}-target");
    let dismiss = format!("data-{prefix}-dismiss");
    let modal_trigger = dom.add(
        dom.root(),
        "button",
        &[(toggle.as_str(), "modal"), (target.as_str(), "#m1")],
    );
    let modal_root = dom.add(
        dom.root(),
        "div",
        &[("id", "m1"), ("class", "opacity-0 pointer-events-none")],
    );
    dom.add(modal_root, "div", &[("class", "scale-95")]);
    let dropdown_trigger = dom.add(
        dom.root(),
        "button",
        &[(toggle.as_str(), "dropdown"), (target.as_str(), "#d1")],
    );
    let dropdown_menu = dom.add(dom.root(), "ul", &[("id", "d1")]);
    let alert = dom.add(dom.root(), "div", &[("role", "alert")]);
    let alert_close = dom.add(alert, "button", &[(dismiss.as_str(), "alert")]);
    Page {
        modal_trigger,
        modal_root,
        dropdown_trigger,
        dropdown_menu,
        alert,
        alert_close,
    }
}

fn modal_state(toolkit: &Toolkit<FakeDom>, root: FakeNode) -> Option<Visibility> {
    toolkit.modals().instance(&root).map(|modal| modal.state())
}

#[test]
fn start_wires_immediate_families_then_anchored_after_load() -> anyhow::Result<()> {
    init_test_logging();
    let dom = FakeDom::shared();
    let page = page(&dom, "dui");
    let loader = FakeLoader::ready();
    let (bridge, engine) = fake_bridge(&loader);
    let toolkit = Toolkit::new(Rc::clone(&dom), bridge, ToolkitConfig::default());

    let report = toolkit.start()?;
    assert_eq!(report.bound, 2);
    assert!(toolkit.scanner().is_attached());
    assert_eq!(
        toolkit.scanner().kinds(),
        vec![FamilyKind::Alert, FamilyKind::Collapse, FamilyKind::Modal]
    );
    dom.click(page.dropdown_trigger);
    assert!(!dom.has_class(&page.dropdown_menu, "hidden"));
    assert_eq!(toolkit.dropdowns().instance_count(), 0);

    dom.run_tasks();
    assert!(toolkit.bridge().is_ready());
    assert_eq!(loader.loads(), 1);
    assert_eq!(toolkit.scanner().kinds().len(), 5);
    assert_eq!(toolkit.dropdowns().bound_count(), 1);

    dom.click(page.dropdown_trigger);
    dom.run_tasks();
    assert!(!dom.is_hidden(page.dropdown_menu));
    assert_eq!(engine.live(), 1);

    dom.click(page.modal_trigger);
    assert_eq!(modal_state(&toolkit, page.modal_root), Some(Visibility::Visible));

    dom.click(page.alert_close);
    assert!(dom.has_class(&page.alert, "hidden"));
    Ok(())
}

#[test]
fn engine_failure_only_disables_anchored_widgets() -> anyhow::Result<()> {
    init_test_logging();
    let dom = FakeDom::shared();
    let page = page(&dom, "dui");
    let loader = FakeLoader::failing("offline");
    let (bridge, engine) = fake_bridge(&loader);
    let toolkit = Toolkit::new(Rc::clone(&dom), bridge, ToolkitConfig::default());
    toolkit.start()?;
    dom.run_tasks();

    assert!(!toolkit.bridge().is_ready());
    assert_eq!(toolkit.scanner().kinds().len(), 3);
    assert_eq!(toolkit.dropdowns().bound_count(), 0);

    dom.click(page.dropdown_trigger);
    assert_eq!(toolkit.dropdowns().instance_count(), 0);
    assert!(engine.calls().is_empty());

    dom.click(page.modal_trigger);
    assert_eq!(modal_state(&toolkit, page.modal_root), Some(Visibility::Visible));
    Ok(())
}

#[test]
fn late_markup_is_picked_up_after_a_mutation() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let (bridge, _engine) = fake_bridge(&FakeLoader::ready());
    let toolkit = Toolkit::new(Rc::clone(&dom), bridge, ToolkitConfig::default());
    assert_eq!(toolkit.start()?.bound, 0);
    dom.run_tasks();

    let page = page(&dom, "dui");
    dom.flush_mutations();
    assert_eq!(toolkit.modals().bound_count(), 1);
    assert_eq!(toolkit.alerts().bound_count(), 1);
    assert_eq!(toolkit.dropdowns().bound_count(), 1);

    dom.click(page.modal_trigger);
    assert_eq!(modal_state(&toolkit, page.modal_root), Some(Visibility::Visible));
    Ok(())
}

#[test]
fn configured_prefix_and_delay_are_honoured() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let ours = page(&dom, "ui");
    let foreign = dom.add(
        dom.root(),
        "button",
        &[("data-dui-toggle", "modal"), ("data-dui-target", "#m1")],
    );
    let config = ToolkitConfig::from_json(r#"{"attributePrefix": "ui", "closeDelayMs": 50}"#)?;
    let (bridge, _engine) = fake_bridge(&FakeLoader::ready());
    let toolkit = Toolkit::new(Rc::clone(&dom), bridge, config);
    toolkit.start()?;
    assert_eq!(toolkit.markup().prefix(), "ui");
    assert_eq!(toolkit.modals().bound_count(), 1);

    dom.click(foreign);
    assert_eq!(toolkit.modals().instance_count(), 0);

    dom.click(ours.modal_trigger);
    dom.click(ours.modal_trigger);
    assert_eq!(modal_state(&toolkit, ours.modal_root), Some(Visibility::Closing));
    dom.advance(50);
    assert_eq!(modal_state(&toolkit, ours.modal_root), Some(Visibility::Hidden));
    Ok(())
}

#[test]
fn shutdown_releases_every_listener_and_observer() -> anyhow::Result<()> {
    let dom = FakeDom::shared();
    let page = page(&dom, "dui");
    let (bridge, engine) = fake_bridge(&FakeLoader::ready());
    let toolkit = Toolkit::new(Rc::clone(&dom), bridge, ToolkitConfig::default());
    toolkit.start()?;
    dom.run_tasks();
    dom.click(page.dropdown_trigger);
    dom.click(page.modal_trigger);
    dom.run_tasks();

    toolkit.shutdown();
    assert!(!toolkit.scanner().is_attached());
    assert_eq!(dom.observer_count(), 0);
    assert_eq!(dom.listener_count(), 0);
    assert_eq!(engine.live(), 0);
    assert_eq!(
        dom.query_all(&toolkit.markup().backdrop_selector())?.len(),
        0
    );
    Ok(())
}

#[test]
fn engine_load_finishing_after_shutdown_binds_nothing() -> anyhow::Result<()> {
    init_test_logging();
    let dom = FakeDom::shared();
    let page = page(&dom, "dui");
    let (loader, release) = FakeLoader::gated();
    let (bridge, _engine) = fake_bridge(&loader);
    let toolkit = Toolkit::new(Rc::clone(&dom), bridge, ToolkitConfig::default());
    toolkit.start()?;
    dom.run_tasks();
    assert_eq!(loader.loads(), 1);

    toolkit.shutdown();
    assert!(toolkit.is_shut_down());
    assert_eq!(dom.listener_count(), 0);

    release
        .send(())
        .map_err(|()| anyhow::anyhow!("loader gate already dropped"))?;
    dom.run_tasks();
    assert!(toolkit.bridge().is_ready());
    assert_eq!(dom.listener_count(), 0);
    assert_eq!(dom.observer_count(), 0);
    assert_eq!(toolkit.scanner().kinds().len(), 3);
    assert_eq!(toolkit.dropdowns().bound_count(), 0);
    assert_eq!(toolkit.popovers().bound_count(), 0);

    let report = toolkit.start()?;
    dom.run_tasks();
    assert_eq!(report.bound, 0);
    assert!(!toolkit.scanner().is_attached());
    assert_eq!(dom.listener_count(), 0);
    dom.click(page.modal_trigger);
    assert!(dom.has_class(&page.modal_root, "pointer-events-none"));
    Ok(())
}

#[test]
fn invalid_config_is_rejected() {
    assert!(ToolkitConfig::from_json(r#"{"attributePrefix": "Bad Prefix"}"#).is_err());
    assert!(ToolkitConfig::from_json(r#"{"closeDelayMs": 999999}"#).is_err());
    assert!(ToolkitConfig::from_json("not json").is_err());
}
