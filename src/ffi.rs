//! C ABI for harnesses written in C or C++.
//!
//! ```c
//! bool get_cpu_vendor(char *buffer, size_t len);
//! bool cpu_has_avx2(void);
//! ```

use crate::api;
use std::os::raw::c_char;

/// # Safety
/// `buffer` must be null or valid for writes of `len` bytes.
unsafe fn with_buffer(buffer: *mut c_char, len: usize, query: fn(&mut [u8]) -> bool) -> bool {
    if buffer.is_null() || len == 0 {
        return false;
    }
    let bytes = std::slice::from_raw_parts_mut(buffer.cast::<u8>(), len);
    query(bytes)
}

/// # Safety
/// `buffer` must be null or valid for writes of `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn get_cpu_vendor(buffer: *mut c_char, len: usize) -> bool {
    with_buffer(buffer, len, api::get_vendor)
}

/// # Safety
/// `buffer` must be null or valid for writes of `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn get_cpu_brand(buffer: *mut c_char, len: usize) -> bool {
    with_buffer(buffer, len, api::get_brand)
}

/// # Safety
/// `buffer` must be null or valid for writes of `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn get_cpu_part(buffer: *mut c_char, len: usize) -> bool {
    with_buffer(buffer, len, api::get_part)
}

/// # Safety
/// `buffer` must be null or valid for writes of `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn get_cpu_cores(buffer: *mut c_char, len: usize) -> bool {
    with_buffer(buffer, len, api::get_core_count)
}

/// # Safety
/// `buffer` must be null or valid for writes of `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn get_cpu_features(buffer: *mut c_char, len: usize) -> bool {
    with_buffer(buffer, len, api::get_feature_summary)
}

#[no_mangle]
pub extern "C" fn cpu_has_sse3() -> bool {
    api::cpu_has_sse3()
}

#[no_mangle]
pub extern "C" fn cpu_has_sse4_2() -> bool {
    api::cpu_has_sse4_2()
}

#[no_mangle]
pub extern "C" fn cpu_has_avx() -> bool {
    api::cpu_has_avx()
}

#[no_mangle]
pub extern "C" fn cpu_has_avx2() -> bool {
    api::cpu_has_avx2()
}

#[no_mangle]
pub extern "C" fn is_cpu_gen_4() -> bool {
    api::is_cpu_gen_4()
}

#[no_mangle]
pub extern "C" fn cpu_has_avx512_f_cd() -> bool {
    api::cpu_has_avx512_f_cd()
}

#[no_mangle]
pub extern "C" fn cpu_has_avx512_er_pf() -> bool {
    api::cpu_has_avx512_er_pf()
}

#[no_mangle]
pub extern "C" fn cpu_has_avx512_vl_dq_bw() -> bool {
    api::cpu_has_avx512_vl_dq_bw()
}

#[no_mangle]
pub extern "C" fn cpu_has_avx512_ifma_vbmi() -> bool {
    api::cpu_has_avx512_ifma_vbmi()
}
