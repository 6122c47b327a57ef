//! Server-side bindings for the non-core protocols the frontend speaks.
//!
//! The unstable `xdg_shell` (v5) and the `screenshooter` protocol used by
//! the companion diagnostic tool are not shipped by `wayland-server`, so
//! their code is generated at compile time from the XML under `protocols/`.

#![allow(missing_docs)]

pub mod xdg {
    //! Unstable xdg-shell, version 5 (`xdg_shell`, `xdg_surface`,
    //! `xdg_popup`). The `use_unstable_version` negotiation request is part
    //! of this revision of the protocol.

    use wayland_server;
    use wayland_server::protocol::*;

    pub mod __interfaces {
        use wayland_server::protocol::__interfaces::*;
        wayland_scanner::generate_interfaces!("./protocols/xdg-shell-unstable-v5.xml");
    }
    use self::__interfaces::*;

    wayland_scanner::generate_server_code!("./protocols/xdg-shell-unstable-v5.xml");
}

pub mod screenshooter {
    //! Output capture for the companion diagnostic tool.

    use wayland_server;
    use wayland_server::protocol::*;

    pub mod __interfaces {
        use wayland_server::protocol::__interfaces::*;
        wayland_scanner::generate_interfaces!("./protocols/weston-screenshooter.xml");
    }
    use self::__interfaces::*;

    wayland_scanner::generate_server_code!("./protocols/weston-screenshooter.xml");
}
