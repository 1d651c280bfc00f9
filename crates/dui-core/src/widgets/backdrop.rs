//! Backdrop layer owned by a visible modal.

use crate::dom::Dom;
use crate::error::DuiResult;
use crate::markup::Markup;

/// A mounted backdrop wrapping one modal element.
///
/// Mounting moves the modal into the backdrop; unmounting puts it back where it was.
#[derive(Debug)]
pub(crate) struct Backdrop<N> {
    layer: N,
    wrapped: N,
    origin_parent: Option<N>,
    origin_next: Option<N>,
}

impl<N: Clone> Backdrop<N> {
    pub(crate) fn mount<D>(dom: &D, markup: &Markup, wrapped: &N, classes: &[String]) -> DuiResult<Self>
    where
        D: Dom<Node = N> + ?Sized,
    {
        let origin_parent = dom.parent(wrapped);
        let origin_next = dom.next_sibling(wrapped);
        let layer = dom.create_element("div")?;
        let classes: Vec<&str> = classes.iter().map(String::as_str).collect();
        dom.add_classes(&layer, &classes)?;
        dom.set_attribute(&layer, &markup.layer_attr(), "backdrop")?;
        dom.append_child(&layer, wrapped)?;
        let body = dom.body()?;
        dom.append_child(&body, &layer)?;
        Ok(Self {
            layer,
            wrapped: wrapped.clone(),
            origin_parent,
            origin_next,
        })
    }

    pub(crate) fn unmount<D>(self, dom: &D) -> DuiResult<()>
    where
        D: Dom<Node = N> + ?Sized,
    {
        let restored = match &self.origin_parent {
            Some(parent) => {
                let parent_key = dom.key(parent);
                let anchor = self.origin_next.as_ref().filter(|next| {
                    dom.parent(next)
                        .is_some_and(|current| dom.key(&current) == parent_key)
                });
                dom.insert_before(parent, &self.wrapped, anchor)
            }
            None => Ok(()),
        };
        dom.remove(&self.layer);
        restored
    }
}
