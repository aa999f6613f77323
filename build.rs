use std::env;

fn main() {
    println!("cargo::rerun-if-env-changed=DEP_NETCDF_HAS_DAP");
    println!("cargo::rustc-check-cfg=cfg(netcdf_dap)");

    // netcdf-sys reports DAP2/DAP4 support of the libnetcdf it linked.
    let has_dap = env::var("DEP_NETCDF_HAS_DAP").is_ok_and(|v| v == "1");
    if has_dap {
        println!("cargo::rustc-cfg=netcdf_dap");
    } else {
        println!("cargo::warning=libnetcdf was built without DAP; remote OPeNDAP URLs cannot be opened");
    }
}
