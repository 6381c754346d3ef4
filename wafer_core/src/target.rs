// Copyright 2026 the Wafer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarative DOM effects of a property and the selector resolution they
//! run through.

use core::fmt;

use serde_json::Value;
use tracing::trace;

use crate::engine::HostExt;
use crate::host::Context;
use crate::value::to_text;
use crate::{Error, Host};

/// Derives the value a target applies from the property value.
///
/// Called with the property value, the owning component and the matched
/// node. Returning `None` means "undefined".
pub type UseFn<H> =
    Box<dyn Fn(&H, Option<&Value>, <H as Host>::Node, <H as Host>::Node) -> Option<Value>>;

/// Arbitrary DOM work for a target.
///
/// Called with the matched node, the applied value and the owning component.
pub type DomFn<H> = Box<
    dyn Fn(&mut H, <H as Host>::Node, Option<&Value>, <H as Host>::Node) -> Result<(), Error>,
>;

/// Where a target applies.
pub enum TargetSelector {
    /// A fixed selector.
    Static(String),
    /// A selector computed from the property value.
    Computed(Box<dyn Fn(Option<&Value>) -> String>),
}

impl fmt::Debug for TargetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(selector) => f.debug_tuple("Static").field(selector).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl TargetSelector {
    fn resolve(&self, value: Option<&Value>) -> String {
        match self {
            Self::Static(selector) => selector.clone(),
            Self::Computed(select) => select(value),
        }
    }
}

/// One DOM effect of a property change.
///
/// Any combination of `attribute`, `property`, `text` and `dom` may be set;
/// they are applied in that order to each matched node.
///
/// ```rust
/// use wafer_core::Target;
/// # use wafer_core::Host;
/// # fn build<H: Host>() -> Target<H> {
/// Target::new("$#count").text().attribute("data-count")
/// # }
/// ```
pub struct Target<H: Host> {
    selector: TargetSelector,
    attribute: Option<String>,
    property: Option<String>,
    text: bool,
    dom: Option<DomFn<H>>,
    using: Option<UseFn<H>>,
}

impl<H: Host> fmt::Debug for Target<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("selector", &self.selector)
            .field("attribute", &self.attribute)
            .field("property", &self.property)
            .field("text", &self.text)
            .field("has_dom", &self.dom.is_some())
            .field("has_use", &self.using.is_some())
            .finish()
    }
}

impl<H: Host> Target<H> {
    /// A target resolved with a fixed selector.
    ///
    /// `"self"` is the owning component, a leading `$` queries its shadow
    /// root, a leading `@` queries the whole document.
    pub fn new(selector: impl Into<String>) -> Self {
        Self::with_selector(TargetSelector::Static(selector.into()))
    }

    /// A target whose selector is computed from the property value.
    pub fn computed(select: impl Fn(Option<&Value>) -> String + 'static) -> Self {
        Self::with_selector(TargetSelector::Computed(Box::new(select)))
    }

    fn with_selector(selector: TargetSelector) -> Self {
        Self {
            selector,
            attribute: None,
            property: None,
            text: false,
            dom: None,
            using: None,
        }
    }

    /// Sets or removes this attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attribute = Some(name.into());
        self
    }

    /// Assigns this property.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.property = Some(name.into());
        self
    }

    /// Replaces the text content.
    #[must_use]
    pub fn text(mut self) -> Self {
        self.text = true;
        self
    }

    /// Runs a callback.
    #[must_use]
    pub fn dom(
        mut self,
        dom: impl Fn(&mut H, H::Node, Option<&Value>, H::Node) -> Result<(), Error> + 'static,
    ) -> Self {
        self.dom = Some(Box::new(dom));
        self
    }

    /// Derives the applied value instead of using the property value as is.
    #[must_use]
    pub fn using(
        mut self,
        using: impl Fn(&H, Option<&Value>, H::Node, H::Node) -> Option<Value> + 'static,
    ) -> Self {
        self.using = Some(Box::new(using));
        self
    }

    fn apply_to(
        &self,
        host: &mut H,
        owner: H::Node,
        el: H::Node,
        value: Option<&Value>,
    ) -> Result<(), Error> {
        let derived = match &self.using {
            Some(using) => using(host, value, owner, el),
            None => value.cloned(),
        };
        if let Some(attribute) = &self.attribute {
            match &derived {
                None | Some(Value::Null | Value::Bool(false)) => {
                    host.remove_attribute(el, attribute)?;
                }
                Some(Value::Bool(true)) => host.set_attribute(el, attribute, "")?,
                Some(value) => host.set_attribute(el, attribute, &to_text(Some(value)))?,
            }
        }
        if let (Some(property), Some(value)) = (&self.property, &derived) {
            host.set_prop(el, property, value.clone())?;
        }
        if self.text {
            host.set_text_content(el, &to_text(derived.as_ref()))?;
        }
        if let Some(dom) = &self.dom {
            dom(host, el, derived.as_ref(), owner)?;
        }
        Ok(())
    }
}

/// Runs `f` on every node `selector` resolves to from `owner`.
///
/// - `"self"` resolves to `owner`.
/// - A leading `$` queries the owner's shadow root. Without one, a client
///   falls back to the owner and a server matches nothing.
/// - A leading `@` queries from the top of the owner's document.
/// - Anything else queries the owner's descendants.
///
/// Matches are collected before `f` runs, and `f` runs on them in tree
/// order. The first error stops the walk.
pub fn apply<H: Host>(
    host: &mut H,
    owner: H::Node,
    selector: &str,
    mut f: impl FnMut(&mut H, H::Node) -> Result<(), Error>,
) -> Result<(), Error> {
    if selector == "self" {
        return f(host, owner);
    }
    let (root, selector) = if let Some(rest) = selector.strip_prefix('$') {
        match host.shadow_root(owner) {
            Some(root) => (root, rest),
            None if host.context() == Context::Client => (owner, rest),
            None => return Ok(()),
        }
    } else if let Some(rest) = selector.strip_prefix('@') {
        (host.root(owner), rest)
    } else {
        (owner, selector)
    };
    for node in host.query_selector_all(root, selector)? {
        f(host, node)?;
    }
    Ok(())
}

/// Applies every target in `targets` for `value` on behalf of `owner`.
pub fn update_targets_with<H: Host>(
    host: &mut H,
    owner: H::Node,
    value: Option<&Value>,
    targets: &[Target<H>],
) -> Result<(), Error> {
    for target in targets {
        let selector = target.selector.resolve(value);
        trace!(?owner, %selector, "applying target");
        apply(host, owner, &selector, |host, el| {
            target.apply_to(host, owner, el, value)
        })?;
    }
    Ok(())
}
