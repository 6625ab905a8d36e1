//! CoRE Link Format rendering (RFC 6690) for `/.well-known/core` and, since
//! it shares the same renderer, the `/p` non-discoverable property listing.

use crate::resource::Resource;

/// Render a list of resources as a `</uri>;rt="...";if="..."` link-format
/// body, joined by commas per RFC 6690 §4.1.
pub fn render(resources: impl IntoIterator<Item = impl AsRef<Resource>>) -> String {
    resources
        .into_iter()
        .map(|r| render_one(r.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

fn render_one(resource: &Resource) -> String {
    let mut out = format!("<{}>", resource.uri);
    if !resource.resource_types.is_empty() {
        out.push_str(&format!(";rt=\"{}\"", resource.resource_types.join(" ")));
    }
    if resource.observable {
        out.push_str(";obs");
    }
    out
}

impl AsRef<Resource> for Resource {
    fn as_ref(&self) -> &Resource {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::InterfaceMask;

    #[test]
    fn renders_comma_joined_links_with_resource_type() {
        let a = Resource::new("/dev/sn", InterfaceMask::I, 60).with_resource_type("dpa.501.10");
        let b = Resource::new("/a/sen", InterfaceMask::A, 60);
        let body = render([&a, &b]);
        assert_eq!(body, "</dev/sn>;rt=\"dpa.501.10\",</a/sen>");
    }

    #[test]
    fn observable_resource_carries_obs_flag() {
        let r = Resource::new("/p/1", InterfaceMask::C, 60).observable();
        assert_eq!(render([&r]), "</p/1>;obs");
    }
}
