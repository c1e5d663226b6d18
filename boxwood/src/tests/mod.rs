// Copyright 2025 the Boxwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod test_lazy;
mod test_layout;
mod test_styles;
mod test_text;
mod utils;
