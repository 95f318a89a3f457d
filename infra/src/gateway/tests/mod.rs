mod mock_gateway_tests;
