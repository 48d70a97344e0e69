use askama::Template;
use shuttle_common::models::deployment::BuildArgsRust;

#[derive(Template)]
#[template(path = "rust.Dockerfile.jinja2", escape = "none")]
pub struct RustDockerfile<'a> {
    /// local or remote image name for the chef image
    pub chef_image: &'a str,
    /// content of inlined chef dockerfile
    pub cargo_chef_dockerfile: Option<&'a str>,
    /// local or remote image name for the runtime image
    pub runtime_image: &'a str,
    /// content of inlined runtime dockerfile
    pub runtime_base_dockerfile: Option<&'a str>,
    pub build_args: &'a BuildArgsRust,
}

pub fn render_rust_dockerfile(build_args: &BuildArgsRust) -> String {
    RustDockerfile {
        chef_image: "cargo-chef",
        cargo_chef_dockerfile: Some(include_str!("../templates/cargo-chef.Dockerfile")),
        runtime_image: "runtime-base",
        runtime_base_dockerfile: Some(include_str!("../templates/runtime-base.Dockerfile")),
        build_args,
    }
    .render()
    .unwrap()
}
